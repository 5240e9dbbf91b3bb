//! Wallet error types.

use harness_core::error::CollaboratorError;
use harness_core::Amount;
use thiserror::Error;

/// Errors that can occur while funding a transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Eligible outputs ran out before covering the outputs plus fee.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Value of every eligible output that was tried.
        have: Amount,
        /// Outputs plus the fee at the last size computed.
        need: Amount,
    },

    /// Account name was empty.
    #[error("account name must not be empty")]
    EmptyAccount,

    /// Fee rate below zero.
    #[error("invalid fee rate: {0}")]
    InvalidFeeRate(Amount),

    /// Nothing to pay.
    #[error("no outputs to fund")]
    NoOutputs,

    /// Invalid output amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Amount arithmetic left the representable range.
    #[error("amount overflow")]
    AmountOverflow,

    /// Change address, script or UTXO listing failed.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_insufficient_funds() {
        let e = WalletError::InsufficientFunds {
            have: Amount::from_atoms(100),
            need: Amount::from_atoms(200),
        };
        assert_eq!(
            e.to_string(),
            "insufficient funds: have 0.00000100, need 0.00000200"
        );
    }

    #[test]
    fn display_empty_account() {
        assert_eq!(
            WalletError::EmptyAccount.to_string(),
            "account name must not be empty"
        );
    }

    #[test]
    fn from_collaborator_error_is_verbatim() {
        let inner = CollaboratorError::Rpc("wallet locked".into());
        let wallet: WalletError = inner.clone().into();
        assert_eq!(wallet, WalletError::Collaborator(inner.clone()));
        assert_eq!(wallet.to_string(), inner.to_string());
    }
}
