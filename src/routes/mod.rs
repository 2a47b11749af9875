pub mod attendance;

pub mod auth;

pub mod dashboard;

pub mod halaqat;

pub mod notifications;

pub mod submissions;

pub mod tasks;

pub mod users;

pub use attendance::configure_attendance_routes;
pub use auth::configure_auth_routes;
pub use dashboard::configure_dashboard_routes;
pub use halaqat::configure_halaqat_routes;
pub use notifications::configure_notifications_routes;
pub use submissions::configure_submissions_routes;
pub use tasks::configure_tasks_routes;
pub use users::configure_user_routes;

use actix_web::web;

/// 注册全部 API 路由
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    configure_auth_routes(cfg);
    configure_user_routes(cfg);
    configure_halaqat_routes(cfg);
    configure_tasks_routes(cfg);
    configure_submissions_routes(cfg);
    configure_dashboard_routes(cfg);
    configure_attendance_routes(cfg);
    configure_notifications_routes(cfg);
}
