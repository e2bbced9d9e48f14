pub mod order_items;
pub mod orders;
pub mod products;
pub mod service_areas;
pub mod staff_invites;
pub mod staff_members;
pub mod vendors;

pub use order_items as order_item_entity;
pub use orders as order_entity;
pub use products as product_entity;
pub use service_areas as service_area_entity;
pub use staff_invites as staff_invite_entity;
pub use staff_members as staff_member_entity;
pub use vendors as vendor_entity;

pub use orders::{OrderStatus, PaymentStatus};
pub use staff_members::StaffRole;
