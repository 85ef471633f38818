pub mod activity_logs;
pub mod auth;
pub mod courses;
pub mod enrollments;
pub mod materials;
pub mod notifications;
pub mod schools;
pub mod signup;
pub mod stats;
pub mod submissions;
pub mod users;
