pub mod health_controller;
pub mod landing_controller;
pub mod proxy_controller;
pub mod video_controller;
