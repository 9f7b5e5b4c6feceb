/// An RGB color, as stored on a point record: one u16 per channel.
///
/// The las specifications recommend scaling 8-bit sources up to the full
/// 16-bit range; this type stores whatever the file says.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color {
    /// Red channel.
    pub red: u16,

    /// Green channel.
    pub green: u16,

    /// Blue channel.
    pub blue: u16,
}

impl Color {
    /// Creates a new color.
    ///
    /// # Examples
    ///
    /// ```
    /// use pointclouds::Color;
    /// let color = Color::new(1, 2, 3);
    /// assert_eq!(2, color.green);
    /// ```
    pub fn new(red: u16, green: u16, blue: u16) -> Color {
        Color { red, green, blue }
    }
}

impl From<[u16; 3]> for Color {
    fn from([red, green, blue]: [u16; 3]) -> Color {
        Color { red, green, blue }
    }
}

impl From<Color> for [u16; 3] {
    fn from(color: Color) -> [u16; 3] {
        [color.red, color.green, color.blue]
    }
}
