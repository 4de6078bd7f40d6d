use anchor_lang::prelude::*;

use crate::constants::{MAX_ENTRANTS, MAX_NUMBER, MIN_NUMBER, NUMBERS_PER_TICKET};
use crate::errors::LottoError;

/// A ticket in the current round.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub struct Entrant {
    pub player: Pubkey,
    pub numbers: [u8; NUMBERS_PER_TICKET],
}

/// Entrants of the current round plus the registered-flag set.
///
/// Membership is tracked in `registered`, separately from the insertion-ordered
/// entrant list, so the duplicate guard never depends on list positions.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct EntryRegistry {
    // Both capacities must match `MAX_ENTRANTS`.
    #[max_len(16)]
    entrants: Vec<Entrant>,
    #[max_len(16)]
    registered: Vec<Pubkey>,
}

/// Check a submitted ticket: exactly six numbers, each in `1..=50`.
pub fn validate_numbers(numbers: &[u8]) -> Result<[u8; NUMBERS_PER_TICKET]> {
    let numbers: [u8; NUMBERS_PER_TICKET] = numbers
        .try_into()
        .map_err(|_| LottoError::InvalidPredictionLength)?;
    require!(
        numbers.iter().all(|n| (MIN_NUMBER..=MAX_NUMBER).contains(n)),
        LottoError::NumberOutOfRange
    );
    Ok(numbers)
}

impl EntryRegistry {
    pub fn is_registered(&self, player: &Pubkey) -> bool {
        self.registered.contains(player)
    }

    /// Append a validated ticket and raise the player's flag.
    ///
    /// Callers check for duplicates first; this only enforces capacity.
    pub fn register(&mut self, player: Pubkey, numbers: [u8; NUMBERS_PER_TICKET]) -> Result<()> {
        require!(self.entrants.len() < MAX_ENTRANTS, LottoError::RoundFull);
        self.registered.push(player);
        self.entrants.push(Entrant { player, numbers });
        Ok(())
    }

    /// Lower a player's registered flag. Missing flags are ignored.
    pub fn clear_flag(&mut self, player: &Pubkey) {
        if let Some(pos) = self.registered.iter().position(|p| p == player) {
            self.registered.swap_remove(pos);
        }
    }

    /// Drop every entrant and stored ticket.
    pub fn clear_entrants(&mut self) {
        self.entrants.clear();
    }

    pub fn len(&self) -> usize {
        self.entrants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entrants.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entrant> {
        self.entrants.get(index)
    }

    pub fn entrants(&self) -> &[Entrant] {
        &self.entrants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundary_numbers() {
        assert_eq!(
            validate_numbers(&[1, 50, 1, 50, 25, 2]).unwrap(),
            [1, 50, 1, 50, 25, 2]
        );
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        for bad in [0u8, 51, 255] {
            let err = validate_numbers(&[bad, 2, 3, 4, 5, 6]).unwrap_err();
            assert_eq!(err, LottoError::NumberOutOfRange.into());
        }
        let err = validate_numbers(&[1, 2, 3, 4, 5, 51]).unwrap_err();
        assert_eq!(err, LottoError::NumberOutOfRange.into());
    }

    #[test]
    fn rejects_wrong_length() {
        for len in [0usize, 5, 7] {
            let numbers = vec![1u8; len];
            let err = validate_numbers(&numbers).unwrap_err();
            assert_eq!(err, LottoError::InvalidPredictionLength.into());
        }
    }

    #[test]
    fn length_is_checked_before_range() {
        let err = validate_numbers(&[0, 0, 0]).unwrap_err();
        assert_eq!(err, LottoError::InvalidPredictionLength.into());
    }

    #[test]
    fn register_keeps_insertion_order() {
        let mut registry = EntryRegistry::default();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        registry.register(a, [1, 2, 3, 4, 5, 6]).unwrap();
        registry.register(b, [7, 8, 9, 10, 11, 12]).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(0).unwrap().player, a);
        assert_eq!(registry.get(1).unwrap().numbers, [7, 8, 9, 10, 11, 12]);
        assert!(registry.get(2).is_none());
        assert!(registry.is_registered(&a));
        assert!(registry.is_registered(&b));
    }

    #[test]
    fn flags_are_independent_of_entrant_list() {
        let mut registry = EntryRegistry::default();
        let a = Pubkey::new_unique();
        registry.register(a, [1, 2, 3, 4, 5, 6]).unwrap();

        registry.clear_entrants();
        assert!(registry.is_empty());
        assert!(registry.is_registered(&a));

        registry.clear_flag(&a);
        assert!(!registry.is_registered(&a));
        registry.clear_flag(&a);
    }

    #[test]
    fn register_rejects_beyond_capacity() {
        let mut registry = EntryRegistry::default();
        for _ in 0..MAX_ENTRANTS {
            registry.register(Pubkey::new_unique(), [1; 6]).unwrap();
        }
        let err = registry
            .register(Pubkey::new_unique(), [1; 6])
            .unwrap_err();
        assert_eq!(err, LottoError::RoundFull.into());
    }
}
