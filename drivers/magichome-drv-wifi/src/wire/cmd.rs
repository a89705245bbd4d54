use magichome_api::color::clamp;

// Builders for the non-color frames. None of them include the
// checksum; the transport appends it.

const OPCODE_POWER: u8 = 0x71;
const OPCODE_PATTERN: u8 = 0x61;
const TERMINATOR: u8 = 0x0f;

pub fn power_cmd(on: bool) -> [u8; 3] {
    [OPCODE_POWER, if on { 0x23 } else { 0x24 }, TERMINATOR]
}

pub fn query_cmd() -> [u8; 3] {
    [0x81, 0x8a, 0x8b]
}

// Converts a speed percentage into the delay value the controller
// expects. Fastest (100) maps to 1, slowest (0) to 31.

pub fn speed_to_delay(speed: u8) -> u8 {
    let speed = f64::from(clamp(speed, 0, 100));

    ((30.0 - (speed / 100.0) * 30.0) + 1.0) as u8
}

pub fn pattern_cmd(pattern: u8, speed: u8) -> [u8; 4] {
    [OPCODE_PATTERN, pattern, speed_to_delay(speed), TERMINATOR]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmds() {
        assert_eq!(power_cmd(true), [0x71, 0x23, 0x0f]);
        assert_eq!(power_cmd(false), [0x71, 0x24, 0x0f]);
        assert_eq!(query_cmd(), [0x81, 0x8a, 0x8b]);
        assert_eq!(pattern_cmd(0x25, 100), [0x61, 0x25, 1, 0x0f]);
        assert_eq!(pattern_cmd(0x26, 0), [0x61, 0x26, 31, 0x0f]);
    }

    #[test]
    fn test_speed_to_delay() {
        assert_eq!(speed_to_delay(0), 31);
        assert_eq!(speed_to_delay(50), 16);
        assert_eq!(speed_to_delay(33), 21);
        assert_eq!(speed_to_delay(100), 1);
        assert_eq!(speed_to_delay(255), 1);
    }
}
