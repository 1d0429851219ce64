mod handoff_test;
mod tracking_test;
