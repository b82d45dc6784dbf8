#[path = "prop_translate.rs"]
mod translate_props;
#[path = "prop_sort.rs"]
mod sort_props;
