use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved payment method. Checkout only selects one; it never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub user_id: Uuid,
    pub brand: String,
    pub last4: String,
    pub is_default: bool,
}

impl PaymentMethod {
    /// Masked display form, e.g. "VISA •••• 4242".
    pub fn display(&self) -> String {
        format!("{} \u{2022}\u{2022}\u{2022}\u{2022} {}", self.brand, self.last4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_masks_all_but_last4() {
        let method = PaymentMethod {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            brand: "VISA".to_string(),
            last4: "4242".to_string(),
            is_default: true,
        };
        let shown = method.display();
        assert!(shown.starts_with("VISA"));
        assert!(shown.ends_with("4242"));
    }
}
