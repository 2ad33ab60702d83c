//! Fixed requests and payload rules of the job-alert subscription.

use npap_frame::{ObjectId, Request, OP_DISABLE, OP_ENABLE};

/// Object queried first; the printer echoes it and reports its feature byte.
pub const DISCOVERY_OBJECT: ObjectId = ObjectId::new(0xE0, 0x73, 0x04);

/// Object whose mask selects the job alerts the printer reports.
pub const ALERT_MASK_OBJECT: ObjectId = ObjectId::new(0xE0, 0x73, 0x01);

/// Object switched on by the generic enable request.
pub const GENERIC_ENABLE_OBJECT: ObjectId = ObjectId::new(0x03, 0x05, 0x02);

/// Family enabled when the printer does not offer feature bit 4.
pub const FALLBACK_E1_OBJECT: ObjectId = ObjectId::new(0xE0, 0xE1, 0x03);

/// Family enabled when the printer does not offer feature bit 0.
pub const FALLBACK_03_OBJECT: ObjectId = ObjectId::new(0xE0, 0x03, 0x09);

/// Bits of the discovery feature byte this client negotiates.
pub const FEATURE_MASK: u8 = 0b0001_0001;

/// Offset of the feature byte in the discovery response payload.
pub const FEATURE_OFFSET: usize = 9;

/// Shortest discovery response that is accepted.
pub const MIN_DISCOVERY_RESPONSE: usize = 11;

/// One follow-up command sent after a successful discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationStep {
    pub name: &'static str,
    pub request: Request,
}

pub fn discovery() -> Request {
    Request::new(OP_ENABLE, DISCOVERY_OBJECT, Vec::new())
}

pub fn generic_enable() -> Request {
    Request::new(OP_ENABLE, GENERIC_ENABLE_OBJECT, vec![0x00])
}

/// Enable exactly the feature bits in `flag`.
pub fn feature_mask(flag: u8) -> Request {
    mask_request(OP_ENABLE, flag)
}

pub fn fallback_e1_enable() -> Request {
    Request::new(OP_ENABLE, FALLBACK_E1_OBJECT, vec![0x01])
}

pub fn fallback_03_enable() -> Request {
    Request::new(OP_ENABLE, FALLBACK_03_OBJECT, Vec::new())
}

/// Disable every job alert (an all-zero mask).
pub fn unsubscribe() -> Request {
    mask_request(OP_DISABLE, 0)
}

fn mask_request(opcode: u8, flag: u8) -> Request {
    Request::new(
        opcode,
        ALERT_MASK_OBJECT,
        vec![0x08, 0x00, flag, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    )
}

/// Feature bits offered in a discovery response (0 when the byte is missing).
pub fn feature_flag(response: &[u8]) -> u8 {
    response.get(FEATURE_OFFSET).copied().unwrap_or(0) & FEATURE_MASK
}

/// Commands that follow a successful discovery, in send order.
pub fn negotiation_plan(flag: u8) -> Vec<NegotiationStep> {
    let mut plan = vec![NegotiationStep {
        name: "generic-enable",
        request: generic_enable(),
    }];
    if flag != 0 {
        plan.push(NegotiationStep {
            name: "feature-mask",
            request: feature_mask(flag),
        });
    }
    if flag & 0x10 == 0 {
        plan.push(NegotiationStep {
            name: "fallback-e1",
            request: fallback_e1_enable(),
        });
    }
    if flag & 0x01 == 0 {
        plan.push(NegotiationStep {
            name: "fallback-03",
            request: fallback_03_enable(),
        });
    }
    plan
}

/// Whether an alert payload belongs to the job-completion families:
/// object byte 0 in {E0, F0}, byte 1 = 73, byte 2 in {01, 03}.
pub fn is_job_alert(payload: &[u8]) -> bool {
    matches!(
        ObjectId::from_payload(payload),
        Some(ObjectId([0xE0 | 0xF0, 0x73, 0x01 | 0x03]))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(request: &Request) -> Vec<u8> {
        request.to_bytes().unwrap().to_vec()
    }

    #[test]
    fn fixed_requests_match_wire_bytes() {
        assert_eq!(
            encoded(&discovery()),
            [0xA5, 0x00, 0x04, 0x50, 0xE0, 0x73, 0x04]
        );
        assert_eq!(
            encoded(&generic_enable()),
            [0xA5, 0x00, 0x05, 0x50, 0x03, 0x05, 0x02, 0x00]
        );
        assert_eq!(
            encoded(&fallback_e1_enable()),
            [0xA5, 0x00, 0x05, 0x50, 0xE0, 0xE1, 0x03, 0x01]
        );
        assert_eq!(
            encoded(&fallback_03_enable()),
            [0xA5, 0x00, 0x04, 0x50, 0xE0, 0x03, 0x09]
        );
        assert_eq!(
            encoded(&unsubscribe()),
            [
                0xA5, 0x00, 0x0D, 0x40, 0xE0, 0x73, 0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00
            ]
        );
    }

    #[test]
    fn feature_mask_embeds_flag() {
        assert_eq!(
            encoded(&feature_mask(0x11)),
            [
                0xA5, 0x00, 0x0D, 0x50, 0xE0, 0x73, 0x01, 0x08, 0x00, 0x11, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00
            ]
        );
    }

    #[test]
    fn feature_flag_masks_byte_nine() {
        let mut response = vec![0u8; 11];
        response[9] = 0xFF;
        assert_eq!(feature_flag(&response), 0x11);
        response[9] = 0x10;
        assert_eq!(feature_flag(&response), 0x10);
        assert_eq!(feature_flag(&[0u8; 5]), 0);
    }

    fn plan_names(flag: u8) -> Vec<&'static str> {
        negotiation_plan(flag).into_iter().map(|s| s.name).collect()
    }

    #[test]
    fn plan_depends_on_feature_bits() {
        assert_eq!(
            plan_names(0x00),
            ["generic-enable", "fallback-e1", "fallback-03"]
        );
        assert_eq!(
            plan_names(0x01),
            ["generic-enable", "feature-mask", "fallback-e1"]
        );
        assert_eq!(
            plan_names(0x10),
            ["generic-enable", "feature-mask", "fallback-03"]
        );
        assert_eq!(plan_names(0x11), ["generic-enable", "feature-mask"]);
    }

    #[test]
    fn job_alert_allow_list() {
        let payload = |b4, b5, b6| vec![0xA5, 0x00, 0x00, 0x50, b4, b5, b6];

        assert!(is_job_alert(&payload(0xE0, 0x73, 0x01)));
        assert!(is_job_alert(&payload(0xF0, 0x73, 0x03)));
        assert!(!is_job_alert(&payload(0xE1, 0x73, 0x01)));
        assert!(!is_job_alert(&payload(0xE0, 0x74, 0x01)));
        assert!(!is_job_alert(&payload(0xE0, 0x73, 0x02)));
        assert!(!is_job_alert(&[0xA5, 0x00]));
    }
}
