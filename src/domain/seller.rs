use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SellerId = Uuid;

/// Daily operating window for a storefront.
///
/// The window may wrap midnight: `close < open` means the seller opens in the
/// evening and closes the next morning. `open == close` is treated as open all
/// day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl OperatingHours {
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.open == self.close {
            true
        } else if self.open < self.close {
            t >= self.open && t < self.close
        } else {
            // Wraps midnight, e.g. 22:00-06:00.
            t >= self.open || t < self.close
        }
    }
}

/// An independent storefront on the marketplace.
///
/// The unit against which quota and operating-hours gates apply. Mutated by
/// seller-facing settings screens, which are outside this subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub id: SellerId,
    pub name: String,
    /// Manual open/closed toggle, independent of operating hours.
    pub is_open: bool,
    pub hours: OperatingHours,
    pub cod_enabled: bool,
    pub transfer_enabled: bool,
    pub bank_account: Option<String>,
    pub qris_payload: Option<String>,
}

impl Seller {
    /// A seller accepts orders only when manually open AND within hours.
    pub fn accepts_orders_at(&self, t: NaiveTime) -> bool {
        self.is_open && self.hours.contains(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(open: &str, close: &str) -> OperatingHours {
        OperatingHours {
            open: open.parse().unwrap(),
            close: close.parse().unwrap(),
        }
    }

    fn t(s: &str) -> NaiveTime {
        s.parse().unwrap()
    }

    #[test]
    fn test_plain_window() {
        let h = hours("08:00:00", "17:00:00");
        assert!(h.contains(t("08:00:00")));
        assert!(h.contains(t("12:30:00")));
        assert!(!h.contains(t("17:00:00")));
        assert!(!h.contains(t("07:59:00")));
    }

    #[test]
    fn test_window_wrapping_midnight() {
        // 22:00-06:00: open late evening, closed mid-morning.
        let h = hours("22:00:00", "06:00:00");
        assert!(h.contains(t("23:30:00")));
        assert!(h.contains(t("02:00:00")));
        assert!(!h.contains(t("10:00:00")));
        assert!(!h.contains(t("06:00:00")));
    }

    #[test]
    fn test_equal_times_means_always_open() {
        let h = hours("00:00:00", "00:00:00");
        assert!(h.contains(t("03:00:00")));
        assert!(h.contains(t("15:00:00")));
    }

    #[test]
    fn test_manual_flag_overrides_hours() {
        let seller = Seller {
            id: Uuid::new_v4(),
            name: "Warung Bu Sri".to_string(),
            is_open: false,
            hours: hours("00:00:00", "00:00:00"),
            cod_enabled: true,
            transfer_enabled: true,
            bank_account: None,
            qris_payload: None,
        };
        assert!(!seller.accepts_orders_at(t("12:00:00")));
    }
}
