pub mod config;
pub mod data_service;
pub mod db;
pub mod models;
pub mod plan;
pub mod users;

use rocket::{routes, Build, Rocket};
use users::{delete_user, UserService};

pub fn build_rocket(service: UserService) -> Rocket<Build> {
    rocket::build()
        .manage(service)
        .mount("/users", routes![delete_user])
}
