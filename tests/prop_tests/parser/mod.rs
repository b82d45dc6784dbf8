#[path = "prop_parse.rs"]
mod parse_props;
