//! Golden Vector Tests for the Power Approximation
//!
//! These tests define EXACT expected outputs for specific inputs. If any of
//! them fail, pricing has changed for every curve on the network. That is
//! a consensus-breaking change and must be intentional.
//!
//! Vectors cover both exponent directions, both regimes, and the regime
//! boundary itself.
