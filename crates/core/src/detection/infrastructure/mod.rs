pub mod blazeface_locator;
pub mod model_resolver;
