use crate::models::{LocationReason, ValidateLocationResponse};
use crate::utils::GeoPoint;

/// Outcome of asking the device for its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoStatus {
    Granted(GeoPoint),
    Denied,
    Timeout,
    NotSupported,
}

/// Why ordering is blocked. Each variant has its own customer message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    PermissionDenied,
    Timeout,
    NotSupported,
    /// Position known, service area not answered yet.
    Checking,
    OutsideArea,
    AreaUnavailable,
    ValidationFailed,
}

impl BlockReason {
    pub fn message(&self) -> &'static str {
        match self {
            BlockReason::PermissionDenied => "לא ניתן לקבל אישור למיקום.",
            BlockReason::Timeout => "לא הצלחנו לאתר את המיקום שלך בזמן. נסה שוב.",
            BlockReason::NotSupported => "המכשיר לא תומך במיקום.",
            BlockReason::Checking => "בודק את המיקום שלך...",
            BlockReason::OutsideArea => "נראה שאתה מחוץ לאזור השירות של הגינה הזאת.",
            BlockReason::AreaUnavailable => "אזור השירות אינו זמין כרגע.",
            BlockReason::ValidationFailed => "שגיאה בבדיקת המיקום.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderGate {
    Allowed(GeoPoint),
    Blocked(BlockReason),
}

impl OrderGate {
    pub fn can_order(&self) -> bool {
        matches!(self, OrderGate::Allowed(_))
    }
}

/// Ordering is allowed only with a granted position that the server placed
/// inside the area. `validation` is `None` while the check is in flight and
/// `Some(Err(()))` when the check itself failed.
pub fn order_gate(
    geo: GeoStatus,
    validation: Option<Result<&ValidateLocationResponse, ()>>,
) -> OrderGate {
    let point = match geo {
        GeoStatus::Granted(point) => point,
        GeoStatus::Denied => return OrderGate::Blocked(BlockReason::PermissionDenied),
        GeoStatus::Timeout => return OrderGate::Blocked(BlockReason::Timeout),
        GeoStatus::NotSupported => return OrderGate::Blocked(BlockReason::NotSupported),
    };

    match validation {
        None => OrderGate::Blocked(BlockReason::Checking),
        Some(Err(())) => OrderGate::Blocked(BlockReason::ValidationFailed),
        Some(Ok(resp)) if resp.allowed && resp.reason == LocationReason::Inside => {
            OrderGate::Allowed(point)
        }
        Some(Ok(resp)) => OrderGate::Blocked(match resp.reason {
            LocationReason::AreaNotFound | LocationReason::NoPolygon => {
                BlockReason::AreaUnavailable
            }
            LocationReason::Outside | LocationReason::Inside => BlockReason::OutsideArea,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HERE: GeoPoint = GeoPoint {
        lat: 32.005,
        lng: 34.705,
    };

    fn answer(allowed: bool, reason: LocationReason) -> ValidateLocationResponse {
        ValidateLocationResponse { allowed, reason }
    }

    #[test]
    fn test_only_granted_and_inside_allows() {
        let inside = answer(true, LocationReason::Inside);
        assert_eq!(
            order_gate(GeoStatus::Granted(HERE), Some(Ok(&inside))),
            OrderGate::Allowed(HERE)
        );

        for geo in [GeoStatus::Denied, GeoStatus::Timeout, GeoStatus::NotSupported] {
            assert!(!order_gate(geo, Some(Ok(&inside))).can_order());
        }
    }

    #[test]
    fn test_each_failure_has_its_own_reason() {
        let reasons = [
            order_gate(GeoStatus::Denied, None),
            order_gate(GeoStatus::Timeout, None),
            order_gate(GeoStatus::NotSupported, None),
            order_gate(GeoStatus::Granted(HERE), None),
            order_gate(GeoStatus::Granted(HERE), Some(Err(()))),
            order_gate(
                GeoStatus::Granted(HERE),
                Some(Ok(&answer(false, LocationReason::Outside))),
            ),
            order_gate(
                GeoStatus::Granted(HERE),
                Some(Ok(&answer(false, LocationReason::NoPolygon))),
            ),
        ];
        let messages: Vec<&str> = reasons
            .iter()
            .map(|g| match g {
                OrderGate::Blocked(r) => r.message(),
                OrderGate::Allowed(_) => panic!("should be blocked: {g:?}"),
            })
            .collect();
        let mut unique = messages.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), messages.len());
    }

    #[test]
    fn test_inconsistent_answer_is_not_trusted() {
        let odd = answer(true, LocationReason::AreaNotFound);
        assert_eq!(
            order_gate(GeoStatus::Granted(HERE), Some(Ok(&odd))),
            OrderGate::Blocked(BlockReason::AreaUnavailable)
        );
    }
}
