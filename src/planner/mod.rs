// Deployment Planner (C5, §4.5).

pub mod model;
pub mod planner;

pub use model::{DeploymentPlan, DeploymentResource, ResourceAction, Stage};
pub use planner::Planner;
