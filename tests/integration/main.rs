//! Integration tests: the workflow and balance probe driven end to end
//! against a scripted brokerage.

mod mock_broker;
