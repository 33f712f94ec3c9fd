//! `--add-qr-code`: the text encoded as a QR symbol.

use qrcodegen::{QrCode, QrCodeEcc};

use super::{Ctx, FieldWidget};
use crate::{
    error::Error,
    forms::model::{Align, Field, FieldKind},
    render::{Canvas, Rect, rgb},
};

const SIDE: f32 = 256.0;
const QUIET_ZONE: i32 = 4;

pub(crate) struct Qr {
    code: QrCode,
}

impl Qr {
    pub fn new(text: &str) -> Result<Self, Error> {
        let code = QrCode::encode_text(text, QrCodeEcc::High).map_err(|e| Error::Qr(e.to_string()))?;
        Ok(Self {
            code,
        })
    }
}

impl FieldWidget for Qr {
    fn measure(&self, _field: &Field, _width: i32, cx: &Ctx) -> (i32, i32) {
        let side = cx.px(SIDE);
        (side, side)
    }

    fn draw(&self, field: &Field, rect: Rect, _focused: bool, canvas: &mut Canvas, _cx: &Ctx) {
        let FieldKind::QrCode {
            align, ..
        } = &field.kind
        else {
            return;
        };
        let modules = self.code.size() + 2 * QUIET_ZONE;
        let module = (rect.w.min(rect.h) / modules).max(1);
        let side = module * modules;
        let x = match align {
            Align::Left => rect.x,
            Align::Center => rect.x + (rect.w - side) / 2,
            Align::Right => rect.right() - side,
        };
        let origin = Rect::new(x, rect.y, side, side);
        canvas.fill_rect(origin, rgb(255, 255, 255));

        let dark = rgb(0, 0, 0);
        for my in 0..self.code.size() {
            for mx in 0..self.code.size() {
                if self.code.get_module(mx, my) {
                    let px = origin.x + (mx + QUIET_ZONE) * module;
                    let py = origin.y + (my + QUIET_ZONE) * module;
                    canvas.fill_rect(Rect::new(px, py, module, module), dark);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_short_text() {
        let qr = Qr::new("https://example.org").unwrap();
        assert!(qr.code.size() >= 21);
    }

    #[test]
    fn oversized_text_is_an_error() {
        let text = "x".repeat(5000);
        assert!(matches!(Qr::new(&text), Err(Error::Qr(_))));
    }
}
