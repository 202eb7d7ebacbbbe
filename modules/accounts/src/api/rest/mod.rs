pub mod extract;
pub mod forms;
pub mod handlers;
pub mod routes;
