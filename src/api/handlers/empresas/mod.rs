//! Company registry endpoints.
//!
//! Every handler authenticates first, so an unauthenticated request is refused
//! with 401 before its body or query is looked at. Field names on the wire are
//! Portuguese (`nome`, `cnpj`, `cidade`, ...), matching the stored columns.

pub mod companies;
pub mod service;
pub mod types;

const NAME_MIN: usize = 3;
const TAX_ID_LEN: usize = 14;

/// A CNPJ is exactly 14 ASCII digits, without punctuation.
fn valid_tax_id(tax_id: &str) -> bool {
    tax_id.len() == TAX_ID_LEN && tax_id.bytes().all(|b| b.is_ascii_digit())
}
