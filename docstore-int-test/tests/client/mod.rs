mod connection_test;
mod timeout_test;
