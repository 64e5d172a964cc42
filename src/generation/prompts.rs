// Prompt templates for the generative service

const STYLE: &str = "Think Studio Ghibli or classic watercolor animation. Soft, delicate line art, expressive brushstrokes, \
gentle lighting, and a soft minimalist background. Masterpiece quality, artistic and romantic.";

/// Prompt for a single flower
pub fn flower(flower: &str, color: &str) -> String {
    format!(
        "A beautiful, single {color} {flower} in a charming hand-drawn animation style. {STYLE}"
    )
}

/// Prompt for the bouquet; the recipient's name goes on the card
pub fn bouquet(flower: &str, color: &str, recipient: &str) -> String {
    format!(
        r#"A lush, overflowing bouquet of many {color} {flower}s in a charming hand-drawn animation style.
The bouquet is beautifully arranged, wrapped in soft decorative paper with a silky ribbon.
Tucked into the flowers is a small, elegant cream-colored card that has the name "{recipient}" written on it in beautiful, clear cursive calligraphy.
{STYLE}"#
    )
}

/// Prompt for the 2x2 proposal comic
pub fn comic(flower: &str, color: &str, has_partner_photo: bool) -> String {
    let partner = if has_partner_photo {
        "Based on the provided photo, adapted into the same soft hand-drawn style."
    } else {
        "A kind, handsome young man with friendly features in the same style."
    };

    format!(
        r#"Create a high-quality 4-panel comic strip in a strict 2x2 grid layout.

VISUAL STYLE (STRICT):
The entire image must look like a charming hand-drawn animation, specifically Studio Ghibli or classic watercolor animation style.
Use soft, delicate line art, expressive brushstrokes, gentle lighting, and soft minimalist backgrounds.
The colors should be pastel and romantic. Masterpiece quality, artistic and romantic.
Do NOT use realistic 3D rendering or harsh photorealism. It must look like a painting or a frame from an anime movie. Matches the style of a delicate watercolor flower painting.

CHARACTERS:
- THE GIRL: Based on the provided photo but adapted into this soft hand-drawn anime/watercolor style. She has her distinct features (hair, glasses, etc) but rendered artistically.
- THE GUY: {partner}

STORYLINE & LAYOUT (Strict 2x2 Grid):
Panel 1 (Top Left): The guy is standing in a cozy, soft-lit room, looking nervously but lovingly at the girl. He is asking "Will you be my Valentine?". He is hiding a large bouquet of {color} {flower}s behind his back.
Panel 2 (Top Right): A close-up of the girl's face. She is looking incredibly happy and surprised, blushing slightly, her eyes sparkling, shouting "YES!".
Panel 3 (Bottom Left): The guy smiling widely as he brings the beautiful bouquet of {color} {flower}s from behind his back and offers it to her. The girl gasps with pure joy.
Panel 4 (Bottom Right): A warm, heartfelt hug between the two. The girl is holding the {color} {flower} bouquet close to her heart.

Include clear speech bubbles for the dialogue. The final image must be a single vertical page containing all 4 panels in a 2x2 grid format. Maintain the soft, artistic watercolor feel throughout."#
    )
}
