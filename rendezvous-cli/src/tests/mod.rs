//! Shared test harness modules for the Rendezvous CLI.

use super::*;

mod helpers;
