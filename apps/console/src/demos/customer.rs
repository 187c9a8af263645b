use serde::{Deserialize, Serialize};

/// Typed demo payload stored in the `mystore` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address_type: String,
    pub address_line1: String,
    pub location: Location,
    pub postal_code: String,
    pub country_region_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub city: String,
    pub state_province_name: String,
}

impl Customer {
    pub fn new(
        name: &str,
        address_line1: &str,
        city: &str,
        state: &str,
        postal_code: &str,
        country: &str,
    ) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            address: Address {
                address_type: "Main Office".to_string(),
                address_line1: address_line1.to_string(),
                location: Location {
                    city: city.to_string(),
                    state_province_name: state.to_string(),
                },
                postal_code: postal_code.to_string(),
                country_region_name: country.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn customer_uses_wire_casing() {
        let customer = Customer::new(
            "John Doe",
            "123 Main Street",
            "Brooklyn",
            "New York",
            "11229",
            "United States",
        );
        let value = serde_json::to_value(&customer).unwrap();

        assert_eq!(
            value,
            json!({
                "name": "John Doe",
                "address": {
                    "addressType": "Main Office",
                    "addressLine1": "123 Main Street",
                    "location": {
                        "city": "Brooklyn",
                        "stateProvinceName": "New York"
                    },
                    "postalCode": "11229",
                    "countryRegionName": "United States"
                }
            })
        );
    }
}
