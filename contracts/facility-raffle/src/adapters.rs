use std::convert::Infallible;

use cosmwasm_std::{Event, Order, StdError, StdResult, Storage, Timestamp};
use facility_raffle_common::{
    Contact, DrawRecordStore, DrawResult, EligibilityProvider, Entry, NotificationGateway,
};

use crate::state::{DrawRecord, DRAW_RECORDS, ELIGIBLE, FACILITIES, FACILITY_WINS};

/// Reads the eligibility index as the draw pool.
pub struct FacilityRegistry<'a> {
    pub storage: &'a dyn Storage,
}

impl EligibilityProvider for FacilityRegistry<'_> {
    type Error = StdError;

    fn list_eligible(&self) -> StdResult<Vec<Entry>> {
        ELIGIBLE
            .keys(self.storage, None, None, Order::Ascending)
            .map(|id| -> StdResult<Entry> {
                let facility = FACILITIES.load(self.storage, id?)?;
                Ok(facility.to_entry())
            })
            .collect()
    }
}

/// Appends winner records for one draw.
pub struct RecordWriter<'a> {
    pub storage: &'a mut dyn Storage,
    pub draw_id: u64,
    pub created_at: Timestamp,
    next_position: u32,
}

impl<'a> RecordWriter<'a> {
    pub fn new(storage: &'a mut dyn Storage, draw_id: u64, created_at: Timestamp) -> Self {
        Self {
            storage,
            draw_id,
            created_at,
            next_position: 0,
        }
    }
}

impl DrawRecordStore for RecordWriter<'_> {
    type Error = StdError;

    fn append(&mut self, result: &DrawResult) -> StdResult<()> {
        // Positions follow selection order even when a write fails
        let position = self.next_position;
        self.next_position += 1;

        let record = DrawRecord {
            draw_id: self.draw_id,
            position,
            facility_id: result.entry_id,
            weight_at_selection: result.weight_at_selection,
            prize_amount: result.prize_amount,
            created_at: self.created_at,
        };
        DRAW_RECORDS.save(self.storage, (self.draw_id, position), &record)?;
        FACILITY_WINS.save(
            self.storage,
            (result.entry_id, self.draw_id),
            &result.prize_amount,
        )?;
        Ok(())
    }
}

/// Emits one `raffle_winner_notification` event per winner. An off-chain
/// mailer subscribes to these events and sends the actual email.
pub struct EventNotifier {
    pub draw_id: u64,
    pub prize_denom: String,
    pub events: Vec<Event>,
}

impl EventNotifier {
    pub fn new(draw_id: u64, prize_denom: impl Into<String>) -> Self {
        Self {
            draw_id,
            prize_denom: prize_denom.into(),
            events: vec![],
        }
    }
}

impl NotificationGateway for EventNotifier {
    type Error = Infallible;

    fn notify(
        &mut self,
        result: &DrawResult,
        contact: &Contact,
        email: &str,
    ) -> Result<(), Infallible> {
        let to_name = contact
            .name
            .clone()
            .unwrap_or_else(|| "Valued Participant".to_string());
        self.events.push(
            Event::new("raffle_winner_notification")
                .add_attribute("draw_id", self.draw_id.to_string())
                .add_attribute("facility_id", result.entry_id.to_string())
                .add_attribute("to_name", to_name)
                .add_attribute("to_email", email)
                .add_attribute("prize_amount", result.prize_amount.to_string())
                .add_attribute("prize_denom", self.prize_denom.clone()),
        );
        Ok(())
    }
}
