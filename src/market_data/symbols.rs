use std::collections::HashMap;

use crate::market_data::types::Instrument;

/// Wire symbol → entity id, fixed at startup.
#[derive(Debug, Clone)]
pub struct SymbolResolver {
    instruments: Vec<Instrument>,
    by_symbol: HashMap<String, String>,
}

impl SymbolResolver {
    pub fn new(instruments: impl IntoIterator<Item = Instrument>) -> Self {
        let mut ordered = Vec::new();
        let mut by_symbol = HashMap::new();
        for instrument in instruments {
            if by_symbol.contains_key(&instrument.wire_symbol) {
                continue;
            }
            by_symbol.insert(instrument.wire_symbol.clone(), instrument.entity_id.clone());
            ordered.push(instrument);
        }
        Self {
            instruments: ordered,
            by_symbol,
        }
    }

    /// Case-insensitive lookup. `None` means the symbol is not tracked.
    pub fn resolve(&self, wire_symbol: &str) -> Option<&str> {
        self.by_symbol
            .get(&wire_symbol.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Subscription channel names, one per instrument, in configuration order.
    pub fn channels(&self) -> Vec<String> {
        self.instruments.iter().map(Instrument::channel).collect()
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }
}
