use crate::error::ReconcileError;

pub(crate) const INVALID_ORDER_ID: &str = "Invalid order_id format. Only alphanumeric characters, \
hyphens, and underscores are allowed.";

/// `[A-Za-z0-9_-]+`
pub fn is_valid_order_id(order_id: &str) -> bool {
    !order_id.is_empty()
        && order_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

pub fn validate_order_id(order_id: &str) -> Result<(), ReconcileError> {
    if is_valid_order_id(order_id) {
        Ok(())
    } else {
        Err(ReconcileError::Validation(INVALID_ORDER_ID.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alnum_hyphen_underscore() {
        for id in ["ORDER-1", "order_2", "abcXYZ0189", "-", "_"] {
            assert!(is_valid_order_id(id), "{id}");
        }
    }

    #[test]
    fn rejects_everything_else() {
        for id in ["", "bad id!", "a b", "x/y", "ü", "order.1", "id\n"] {
            assert!(!is_valid_order_id(id), "{id:?}");
            assert!(matches!(
                validate_order_id(id),
                Err(ReconcileError::Validation(_))
            ));
        }
    }
}
