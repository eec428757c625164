use serde_json::Value;

/// Sanitizes sensitive fields in JSON payloads for logging
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, val) in map {
                let sanitized_val = if is_sensitive_field(key) {
                    mask_value(val)
                } else {
                    sanitize_json(val)
                };
                sanitized.insert(key.clone(), sanitized_val);
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_json).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_field(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "password" | "contrasena" | "password_hash" | "token" | "secret" | "authorization" | "email"
    )
}

fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > 8 => {
            let visible: String = s.chars().take(2).collect();
            Value::String(format!("{}****", visible))
        }
        _ => Value::String("****".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_password() {
        let input = json!({
            "username": "panadero",
            "password": "super-secret-password"
        });

        let sanitized = sanitize_json(&input);

        assert_eq!(sanitized["password"], "su****");
        assert_eq!(sanitized["username"], "panadero");
    }

    #[test]
    fn test_sanitize_short_value_fully_masked() {
        let sanitized = sanitize_json(&json!({ "token": "abc" }));
        assert_eq!(sanitized["token"], "****");
    }

    #[test]
    fn test_sanitize_nested() {
        let input = json!({
            "user": {
                "email": "baker@example.com",
                "name": "Juana"
            },
            "lines": [{ "quantity": 2 }]
        });

        let sanitized = sanitize_json(&input);
        assert!(sanitized["user"]["email"].as_str().unwrap().contains("****"));
        assert_eq!(sanitized["user"]["name"], "Juana");
        assert_eq!(sanitized["lines"][0]["quantity"], 2);
    }
}
