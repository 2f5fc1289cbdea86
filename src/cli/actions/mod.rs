pub mod login;

#[derive(Debug)]
pub enum Action {
    Login { service: String, separator: String },
}
