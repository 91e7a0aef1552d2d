mod integration;
mod loopback;
mod support;
