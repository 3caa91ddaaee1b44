//! CC-to-control mapping
//!
//! Translates raw [`MidiInputEvent`]s into [`ControlEvent`]s for the router,
//! scaling each controller value to its parameter's range.

use loopfx_core::control::{mode_cc_step, ControlEvent, Param};

use crate::config::{CcMap, CcTarget, MidiConfig};
use crate::input::MidiInputEvent;
use crate::normalize::{cc_to_delay_ms, normalize_cc_value, ControlRange};

#[derive(Debug, Clone, Copy)]
pub struct CcMapper {
    map: CcMap,
    channel: Option<u8>,
}

impl CcMapper {
    pub fn new(map: CcMap, channel: Option<u8>) -> Self {
        Self { map, channel }
    }

    pub fn from_config(config: &MidiConfig) -> Self {
        Self::new(config.cc_map, config.channel)
    }

    /// Map one event, or None if it isn't a mapped controller
    ///
    /// A mode CC in the center band (63-64) has no direction and maps to
    /// nothing.
    pub fn map_event(&self, event: &MidiInputEvent) -> Option<ControlEvent> {
        let MidiInputEvent::ControlChange { channel, cc, value } = *event else {
            return None;
        };
        if self.channel.is_some_and(|wanted| wanted != channel) {
            return None;
        }

        let set = |param: Param, value: f32| ControlEvent::SetParam {
            param,
            value: param.clamp(value),
        };

        match self.map.lookup(cc)? {
            CcTarget::DryWet => Some(set(Param::DryWet, normalize_cc_value(value, ControlRange::Unit))),
            CcTarget::Feedback => Some(set(Param::Feedback, normalize_cc_value(value, ControlRange::Unit))),
            CcTarget::DelayMs => Some(set(Param::DelayMs, cc_to_delay_ms(value))),
            CcTarget::Crossfade => Some(set(Param::Crossfade, normalize_cc_value(value, ControlRange::Unit))),
            CcTarget::Mode => match mode_cc_step(value) {
                0 => None,
                step => Some(ControlEvent::StepMode(step)),
            },
        }
    }
}
