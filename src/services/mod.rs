pub mod calendar;
pub mod dispatcher;
pub mod messaging;
pub mod notify;
pub mod pending;
pub mod sheets;
pub mod slots;

mod slots_proptest;
