pub mod access_service;
pub mod invoice_service;
pub mod location_service;
pub mod notification_service;
pub mod order_lifecycle_service;
pub mod order_service;
pub mod payment_service;
pub mod product_service;
pub mod side_effect_service;
pub mod vendor_service;

pub use access_service::*;
pub use invoice_service::*;
pub use location_service::*;
pub use notification_service::*;
pub use order_lifecycle_service::*;
pub use order_service::*;
pub use payment_service::*;
pub use product_service::*;
pub use side_effect_service::*;
pub use vendor_service::*;
