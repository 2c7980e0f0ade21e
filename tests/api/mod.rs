mod admin_tests;
mod auth_tests;
mod health_tests;
mod storefront_tests;
