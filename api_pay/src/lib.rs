use actix_web::web::{self};

pub mod routes {
    pub mod checkout;
    pub mod webhook;
}

mod services {
    pub(crate) mod checkout;
    pub(crate) mod webhook;
}

mod dtos {
    pub(crate) mod checkout;
}

pub fn mount_checkout() -> actix_web::Scope {
    web::scope("/stripe").service(routes::checkout::post_create_checkout_session)
}

pub fn mount_webhook() -> actix_web::Scope {
    web::scope("/webhooks").service(routes::webhook::post_stripe_webhook)
}
