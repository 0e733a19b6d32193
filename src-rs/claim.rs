use crate::error::ValidationError;

/// A statement submitted for checking, optionally with an image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claim {
    pub text: Option<String>,
    pub image_url: Option<String>,
}

impl Claim {
    /// Blank strings count as absent. At least one of text or image is required.
    pub fn from_request(input: Option<String>, image: Option<String>) -> Result<Self, ValidationError> {
        let text = non_blank(input);
        let image_url = non_blank(image);
        if text.is_none() && image_url.is_none() {
            return Err(ValidationError::NoInput);
        }
        Ok(Self { text, image_url })
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn image(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_text_or_image() {
        assert_eq!(Claim::from_request(None, None), Err(ValidationError::NoInput));
        assert_eq!(
            Claim::from_request(Some("   ".into()), Some(String::new())),
            Err(ValidationError::NoInput)
        );
    }

    #[test]
    fn image_only_is_accepted() {
        let claim = Claim::from_request(None, Some("https://img.test/a.png".into())).unwrap();
        assert_eq!(claim.text(), None);
        assert_eq!(claim.image(), Some("https://img.test/a.png"));
    }

    #[test]
    fn text_is_trimmed() {
        let claim = Claim::from_request(Some("  sky is blue \n".into()), None).unwrap();
        assert_eq!(claim.text(), Some("sky is blue"));
    }
}
