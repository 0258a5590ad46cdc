mod helpers;
mod ledger;
mod misc;
mod orders;
mod users;
