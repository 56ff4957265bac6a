use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProductsRequest {
    #[serde(default)]
    pub order_id: Option<String>,
}
