pub mod read_server;
