/// Write request for the atomic customer upsert, keyed by email.
///
/// Empty strings mean "leave the stored value alone" when the email already
/// exists; they are only written verbatim on first insert.
pub struct CustomerUpsertRequest {
    pub stripe_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}
