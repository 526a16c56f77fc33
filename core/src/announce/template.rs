//! Announcement template expansion
//!
//! Supported placeholders: `{number}`, `{department}`, `{hospitalName}`,
//! `{room}`. Anything else in braces is copied through unchanged.

/// Values substituted into an announcement template
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateVars<'a> {
    pub number: &'a str,
    pub department: &'a str,
    pub hospital_name: &'a str,
    pub room: &'a str,
}

impl<'a> TemplateVars<'a> {
    fn lookup(&self, name: &str) -> Option<&'a str> {
        match name {
            "number" => Some(self.number),
            "department" => Some(self.department),
            "hospitalName" => Some(self.hospital_name),
            "room" => Some(self.room),
            _ => None,
        }
    }
}

/// Substitute known placeholders literally. Substituted values are not rescanned.
pub fn expand_template(template: &str, vars: &TemplateVars<'_>) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        match vars.lookup(&after[..close]) {
            Some(value) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> TemplateVars<'static> {
        TemplateVars {
            number: "P5",
            department: "Pharmacy",
            hospital_name: "City General",
            room: "3",
        }
    }

    #[test]
    fn expands_number_and_department() {
        assert_eq!(
            expand_template("Token {number}, proceed to {department}", &vars()),
            "Token P5, proceed to Pharmacy"
        );
    }

    #[test]
    fn expands_every_placeholder_and_repeats() {
        assert_eq!(
            expand_template("{hospitalName}: {number} to room {room}. {number}!", &vars()),
            "City General: P5 to room 3. P5!"
        );
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        assert_eq!(
            expand_template("Token {number} at {counter}", &vars()),
            "Token P5 at {counter}"
        );
        assert_eq!(expand_template("{{number}}", &vars()), "{P5}");
        assert_eq!(expand_template("open {number", &vars()), "open {number");
        assert_eq!(expand_template("}{}", &vars()), "}{}");
    }

    #[test]
    fn values_are_not_rescanned() {
        let v = TemplateVars {
            number: "{room}",
            ..vars()
        };
        assert_eq!(expand_template("{number}", &v), "{room}");
    }
}
