#![allow(dead_code)]

pub mod update_server;
