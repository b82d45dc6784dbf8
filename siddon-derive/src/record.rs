use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Error, Expr, ExprLit, Field, Fields, Lit, LitStr, Meta, Type};

const DB_TAG: &str = "db";
const ATTR_TAG: &str = "attr";
const EMBED_MARKER: &str = "embed";

// derive_record
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let specs = named_fields(input)?
        .iter()
        .map(FieldSpec::from_field)
        .collect::<syn::Result<Vec<_>>>()?;

    let defs = specs.iter().map(FieldSpec::def_tokens);
    let values = specs.iter().map(FieldSpec::value_tokens);

    Ok(quote! {
        impl #impl_generics ::siddon::Record for #ident #ty_generics #where_clause {
            const FIELDS: &'static [::siddon::parser::FieldDef] = &[#(#defs),*];

            fn field_values(
                &self,
            ) -> ::core::result::Result<
                ::std::vec::Vec<::siddon::parser::FieldValue>,
                ::siddon::DbError,
            > {
                ::core::result::Result::Ok(::std::vec![#(#values),*])
            }
        }
    })
}

fn named_fields(input: &DeriveInput) -> syn::Result<&syn::punctuated::Punctuated<Field, syn::token::Comma>> {
    const MSG: &str = "Record can only be derived for structs with named fields";

    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => Ok(&named.named),
            other => Err(Error::new_spanned(other, MSG)),
        },
        _ => Err(Error::new_spanned(&input.ident, MSG)),
    }
}

///
/// FieldKind
///

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldKind {
    Int,
    IntPtr,
    UInt,
    UIntPtr,
    Float,
    Bool,
    Str,
    Embedded,
    Other,
}

///
/// FieldSpec
///

struct FieldSpec<'a> {
    field: &'a Field,
    name: String,
    storage_key: String,
    attrs: Vec<String>,
    kind: FieldKind,
}

impl<'a> FieldSpec<'a> {
    fn from_field(field: &'a Field) -> syn::Result<Self> {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new_spanned(field, "expected a named field"))?;
        let name = ident.to_string().trim_start_matches("r#").to_string();

        let storage_key = single_tag(&field.attrs, DB_TAG)?
            .map(|lit| lit.value())
            .unwrap_or_default();
        let attrs: Vec<String> = single_tag(&field.attrs, ATTR_TAG)?
            .map(|lit| split_markers(&lit.value()))
            .unwrap_or_default();

        let kind = if attrs.iter().any(|a| a == EMBED_MARKER) {
            FieldKind::Embedded
        } else {
            classify(&field.ty)
        };

        Ok(Self { field, name, storage_key, attrs, kind })
    }

    fn def_tokens(&self) -> TokenStream {
        let name = &self.name;
        let storage_key = &self.storage_key;
        let attrs = &self.attrs;
        let ty = &self.field.ty;
        let type_name = quote!(#ty).to_string().replace(' ', "");
        let embedded = if self.kind == FieldKind::Embedded {
            quote!(::core::option::Option::Some(<#ty as ::siddon::Record>::FIELDS))
        } else {
            quote!(::core::option::Option::None)
        };

        quote! {
            ::siddon::parser::FieldDef {
                name: #name,
                type_name: #type_name,
                storage_key: #storage_key,
                attrs: &[#(#attrs),*],
                embedded: #embedded,
            }
        }
    }

    fn value_tokens(&self) -> TokenStream {
        let Some(f) = self.field.ident.as_ref() else {
            return quote!(::siddon::parser::FieldValue::Other(::core::option::Option::None));
        };

        match self.kind {
            FieldKind::Int => quote! {
                ::siddon::parser::FieldValue::Int(::core::convert::From::from(self.#f))
            },
            FieldKind::IntPtr => quote! {
                ::siddon::parser::FieldValue::Int(self.#f as i64)
            },
            FieldKind::UInt => quote! {
                ::siddon::parser::FieldValue::UInt(::core::convert::From::from(self.#f))
            },
            FieldKind::UIntPtr => quote! {
                ::siddon::parser::FieldValue::UInt(self.#f as u64)
            },
            FieldKind::Float => quote! {
                ::siddon::parser::FieldValue::Float(::core::convert::From::from(self.#f))
            },
            FieldKind::Bool => quote! {
                ::siddon::parser::FieldValue::Bool(self.#f)
            },
            FieldKind::Str => quote! {
                ::siddon::parser::FieldValue::Str(::std::string::ToString::to_string(&self.#f))
            },
            FieldKind::Embedded => quote! {
                ::siddon::parser::FieldValue::Embedded(::siddon::parser::parse(&self.#f)?)
            },
            FieldKind::Other => quote! {
                ::siddon::parser::FieldValue::Other(::siddon::bson::serialize_to_bson(&self.#f).ok())
            },
        }
    }
}

fn single_tag(attrs: &[Attribute], tag: &str) -> syn::Result<Option<LitStr>> {
    let mut found: Option<LitStr> = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident(tag)) {
        if found.is_some() {
            return Err(Error::new_spanned(attr, format!("duplicate `{tag}` attribute")));
        }
        found = Some(tag_value(attr, tag)?);
    }

    Ok(found)
}

fn tag_value(attr: &Attribute, tag: &str) -> syn::Result<LitStr> {
    match &attr.meta {
        Meta::List(_) => attr.parse_args::<LitStr>(),
        Meta::NameValue(nv) => match &nv.value {
            Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Ok(s.clone()),
            other => Err(Error::new_spanned(other, "expected a string literal")),
        },
        Meta::Path(path) => Err(Error::new_spanned(
            path,
            format!("expected `#[{tag}(\"...\")]` or `#[{tag} = \"...\"]`"),
        )),
    }
}

fn split_markers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn classify(ty: &Type) -> FieldKind {
    match ty {
        Type::Group(group) => classify(&group.elem),
        Type::Paren(paren) => classify(&paren.elem),
        Type::Reference(reference) => {
            if is_bare_ident(&reference.elem, "str") {
                FieldKind::Str
            } else {
                FieldKind::Other
            }
        }
        Type::Path(path) if path.qself.is_none() => {
            let Some(segment) = path.path.segments.last() else {
                return FieldKind::Other;
            };
            if !segment.arguments.is_empty() {
                return FieldKind::Other;
            }
            match segment.ident.to_string().as_str() {
                "i8" | "i16" | "i32" | "i64" => FieldKind::Int,
                "isize" => FieldKind::IntPtr,
                "u8" | "u16" | "u32" | "u64" => FieldKind::UInt,
                "usize" => FieldKind::UIntPtr,
                "f32" | "f64" => FieldKind::Float,
                "bool" => FieldKind::Bool,
                "String" => FieldKind::Str,
                _ => FieldKind::Other,
            }
        }
        _ => FieldKind::Other,
    }
}

fn is_bare_ident(ty: &Type, ident: &str) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };

    path.qself.is_none() && path.path.is_ident(ident)
}
