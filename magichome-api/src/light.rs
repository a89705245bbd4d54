/// The logical state of one light, as understood by its controller.
///
/// Values are not range-checked. Hosts are expected to clamp user
/// input before it gets here: hue in `0..360`, the rest in `0..=100`.
/// `luminance` takes part in the color conversion, but it is never
/// sent to a device or read back from one. `brightness` scales every
/// channel uniformly when a command is encoded.

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LightState {
    pub hue: u16,
    pub saturation: u8,
    pub luminance: u8,
    pub brightness: u8,
    pub on: bool,
}

impl LightState {
    /// Hue of the state a light settles into after an effect ends.
    pub const IDLE_HUE: u16 = 0;

    /// Saturation of the idle state. It's low enough that most
    /// variants render it with their white channels.
    pub const IDLE_SATURATION: u8 = 5;

    /// Puts the light in its neutral, full-brightness state.

    pub fn go_idle(&mut self) {
        self.hue = Self::IDLE_HUE;
        self.saturation = Self::IDLE_SATURATION;
        self.brightness = 100;
    }

    pub fn is_idle(&self) -> bool {
        self.hue == Self::IDLE_HUE
            && self.saturation == Self::IDLE_SATURATION
            && self.brightness == 100
    }
}

impl Default for LightState {
    fn default() -> Self {
        LightState {
            hue: 255,
            saturation: 100,
            luminance: 50,
            brightness: 100,
            on: true,
        }
    }
}
