//! # queue-gateway
//!
//! HTTP gateway in front of a Redis dedup index and a durable RabbitMQ
//! queue. Callers check whether a key was already submitted and submit new
//! work, which is recorded in Redis and then published to the queue.
//!
//! Both backend connections are established once at startup with bounded,
//! fixed-interval retries and shared by every request afterwards.

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod health;
pub mod http;
pub mod model;
pub mod telemetry;
