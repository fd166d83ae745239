//! Purchase classification heuristics over resolved transactions.
//!
//! All functions here are pure; a failure to classify one transaction is
//! expressed as "does not qualify" and never aborts a poll cycle.

use solana_sdk::native_token::LAMPORTS_PER_SOL;

use crate::core::{ResolvedTransaction, UNKNOWN_TOKEN_SYMBOL, WRAPPED_SOL_MINT};
use crate::reference::TokenRegistry;

/// True iff at least one instruction targets the SPL Token program.
///
/// This detects token-program involvement, not purchase semantics: a burn or
/// an account close also qualifies. Downstream filters are tuned against this
/// heuristic as-is.
pub fn is_purchase(tx: &ResolvedTransaction) -> bool {
    let token_program = spl_token::id().to_string();
    tx.instructions
        .iter()
        .any(|instruction| instruction.program_id == token_program)
}

/// Estimated SOL value: sum of absolute pre/post native balance deltas across
/// all accounts, converted from lamports.
///
/// An upper bound, not an exact purchase amount; fees and unrelated balance
/// movement are included.
pub fn estimate_value(tx: &ResolvedTransaction) -> f64 {
    let total_delta: u128 = tx
        .pre_balances
        .iter()
        .zip(tx.post_balances.iter())
        .map(|(pre, post)| pre.abs_diff(*post) as u128)
        .sum();

    total_delta as f64 / LAMPORTS_PER_SOL as f64
}

/// The mint the transaction trades, when one can be identified.
///
/// Prefers a mint carried directly by a token instruction (`transferChecked`
/// and friends), then falls back to the transaction's token balance entries,
/// skipping wrapped SOL since it is the quote side of most swaps.
pub fn extract_token_mint(tx: &ResolvedTransaction) -> Option<&str> {
    let token_program = spl_token::id().to_string();

    if let Some(mint) = tx
        .instructions
        .iter()
        .filter(|instruction| instruction.program_id == token_program)
        .find_map(|instruction| instruction.mint.as_deref())
    {
        return Some(mint);
    }

    tx.token_mints
        .iter()
        .map(String::as_str)
        .find(|mint| *mint != WRAPPED_SOL_MINT)
        .or_else(|| tx.token_mints.first().map(String::as_str))
}

/// Resolves the traded token's symbol through the registry's mint index,
/// reporting `UNKNOWN` for unregistered or unidentifiable mints.
pub fn resolve_token_symbol(tx: &ResolvedTransaction, registry: &TokenRegistry) -> String {
    extract_token_mint(tx)
        .and_then(|mint| registry.symbol_for_mint(mint))
        .unwrap_or(UNKNOWN_TOKEN_SYMBOL)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InstructionSummary;

    const TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
    const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";

    fn transaction_with(
        instructions: Vec<InstructionSummary>,
        pre: Vec<u64>,
        post: Vec<u64>,
        token_mints: Vec<String>,
    ) -> ResolvedTransaction {
        ResolvedTransaction {
            signature: "sig".to_string(),
            fee_payer: "payer".to_string(),
            instructions,
            pre_balances: pre,
            post_balances: post,
            token_mints,
            block_time: None,
        }
    }

    fn instruction(program_id: &str, mint: Option<&str>) -> InstructionSummary {
        InstructionSummary {
            program_id: program_id.to_string(),
            mint: mint.map(str::to_string),
        }
    }

    #[test]
    fn token_program_instruction_qualifies_as_purchase() {
        let tx = transaction_with(
            vec![
                instruction(SYSTEM_PROGRAM, None),
                instruction(TOKEN_PROGRAM, None),
            ],
            vec![],
            vec![],
            vec![],
        );
        assert!(is_purchase(&tx));
    }

    #[test]
    fn transaction_without_token_program_does_not_qualify() {
        let tx = transaction_with(vec![instruction(SYSTEM_PROGRAM, None)], vec![], vec![], vec![]);
        assert!(!is_purchase(&tx));
    }

    #[test]
    fn value_sums_absolute_deltas_in_sol() {
        // 2.5 SOL out of one account, 2.4 into another: deltas sum to 4.9.
        let tx = transaction_with(
            vec![],
            vec![5_000_000_000, 1_000_000_000],
            vec![2_500_000_000, 3_400_000_000],
            vec![],
        );
        assert!((estimate_value(&tx) - 4.9).abs() < 1e-9);
    }

    #[test]
    fn value_of_empty_balances_is_zero() {
        let tx = transaction_with(vec![], vec![], vec![], vec![]);
        assert_eq!(estimate_value(&tx), 0.0);
    }

    #[test]
    fn mint_comes_from_token_instruction_first() {
        let tx = transaction_with(
            vec![instruction(TOKEN_PROGRAM, Some("MintFromInstruction"))],
            vec![],
            vec![],
            vec!["MintFromBalances".to_string()],
        );
        assert_eq!(extract_token_mint(&tx), Some("MintFromInstruction"));
    }

    #[test]
    fn mint_fallback_skips_wrapped_sol() {
        let tx = transaction_with(
            vec![instruction(TOKEN_PROGRAM, None)],
            vec![],
            vec![],
            vec![
                WRAPPED_SOL_MINT.to_string(),
                "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263".to_string(),
            ],
        );
        assert_eq!(
            extract_token_mint(&tx),
            Some("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263")
        );
    }

    #[test]
    fn unidentifiable_mint_resolves_to_unknown() {
        let registry = TokenRegistry::new();
        let tx = transaction_with(vec![instruction(TOKEN_PROGRAM, None)], vec![], vec![], vec![]);
        assert_eq!(resolve_token_symbol(&tx, &registry), UNKNOWN_TOKEN_SYMBOL);
    }

    #[test]
    fn registered_mint_resolves_to_symbol() {
        let registry = TokenRegistry::new();
        let bonk_mint = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
        let tx = transaction_with(
            vec![instruction(TOKEN_PROGRAM, Some(bonk_mint))],
            vec![],
            vec![],
            vec![],
        );
        assert_eq!(resolve_token_symbol(&tx, &registry), "BONK");
    }
}
