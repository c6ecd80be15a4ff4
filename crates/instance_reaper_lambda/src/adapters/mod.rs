pub mod ec2;
pub mod waiter;
