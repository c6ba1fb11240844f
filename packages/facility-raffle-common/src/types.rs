use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

/// The lifecycle status of a draw.
#[cw_serde]
pub enum DrawStatus {
    Committed,
    Revealed,
    Expired,
}

/// Contact details used to reach a winner. Opaque to the draw engine.
#[cw_serde]
#[derive(Default)]
pub struct Contact {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A single candidate in a draw.
///
/// `weight` is the raw points value as handed over by the eligibility
/// provider. Negative values are rejected before sampling; zero-weight
/// entries are carried but can never win.
#[cw_serde]
pub struct Entry {
    pub id: u64,
    pub weight: i64,
    pub contact: Contact,
}

/// One winner selected by a single engine invocation.
#[cw_serde]
pub struct DrawResult {
    pub entry_id: u64,
    /// Weight the entry held in the pool when it was drawn.
    pub weight_at_selection: u64,
    pub prize_amount: Uint128,
}
