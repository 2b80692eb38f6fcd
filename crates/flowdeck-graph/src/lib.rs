pub mod geometry;
pub mod hit;
pub mod layout;
pub mod mutation;
pub mod route;
pub mod validate;
pub mod viewport;

pub use geometry::{Rect, Vec2};
pub use hit::{HitTarget, HitTester};
pub use layout::{Layout, LayoutOptions, LayeredLayout, PositionOverrides};
pub use mutation::{EdgePatch, NodeDisplayMut, WorkflowGraph};
pub use route::{CubicBezier, EdgeRouter};
pub use validate::validate;
pub use viewport::Viewport;
