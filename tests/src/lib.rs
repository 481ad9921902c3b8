#![cfg(test)]

mod discovery;
