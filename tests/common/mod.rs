use gateway_core::model::{Catalog, CatalogModel, Message, Pricing, ProviderModels};

pub fn model(name: &str, context_window: u64, input: f64, output: f64, free: bool) -> CatalogModel {
    CatalogModel {
        name: name.to_string(),
        context_window,
        pricing: Pricing { input, output },
        free,
        category: None,
    }
}

pub fn catalog_with(provider_type: &str, models: Vec<CatalogModel>) -> Catalog {
    let mut catalog = Catalog::new();
    catalog.insert(provider_type.to_string(), ProviderModels { models });
    catalog
}

pub fn single_user_message(text: &str) -> Vec<Message> {
    vec![Message::user(text)]
}
