//! Request bodies and query strings the portal expects.
//!
//! The layouts are owned by the portal. Field order and fixed values must
//! stay exactly as they are here.

/// Content type for the XML login POST.
pub const LOGIN_CONTENT_TYPE: &str = "text/xml; charset=UTF-8";

/// Dataset namespace of the login body.
pub const DATASET_NAMESPACE: &str = "http://www.nexacroplatform.com/platform/dataset";

/// Fixed query parameters of the license-email request, in wire order.
const LICENSE_FIXED_PARAMS: [(&str, &str); 8] = [
    ("service", "xupservice"),
    ("domain", "NEXTp"),
    ("model", "CE_LicenseEMailSend_R01"),
    ("format", "xml"),
    ("version", "xplatform"),
    ("p_ConType", "TECH2"),
    ("p_Product", "NP14"),
    ("p_Language", "KOR"),
];

/// Build the XML login body.
///
/// Credentials are XML-escaped before insertion. The returned string holds
/// the password; it must not be logged.
pub fn build_login_xml(user_id: &str, user_pass: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <Root xmlns=\"{ns}\">\n\
         \t<Parameters>\n\
         \t\t<Parameter id=\"RTYPE\">XML</Parameter>\n\
         \t\t<Parameter id=\"DB\">CS</Parameter>\n\
         \t\t<Parameter id=\"DBUSER\">POTAL_USER</Parameter>\n\
         \t</Parameters>\n\
         \t<Dataset id=\"input\">\n\
         \t\t<ColumnInfo>\n\
         \t\t\t<Column id=\"userId\" type=\"STRING\" size=\"256\" />\n\
         \t\t\t<Column id=\"userPass\" type=\"STRING\" size=\"256\" />\n\
         \t\t</ColumnInfo>\n\
         \t\t<Rows>\n\
         \t\t\t<Row>\n\
         \t\t\t\t<Col id=\"userId\">{user_id}</Col>\n\
         \t\t\t\t<Col id=\"userPass\">{user_pass}</Col>\n\
         \t\t\t</Row>\n\
         \t\t</Rows>\n\
         \t</Dataset>\n\
         </Root>",
        ns = DATASET_NAMESPACE,
        user_id = xml_escape(user_id),
        user_pass = xml_escape(user_pass),
    )
}

/// Build the license-email query parameters.
pub fn build_license_params(customer_id: &str, email: &str) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> = LICENSE_FIXED_PARAMS
        .iter()
        .map(|(k, v)| (*k, (*v).to_string()))
        .collect();
    params.push(("p_CustomID", customer_id.to_string()));
    params.push(("p_Email", email.to_string()));
    params.push(("p_Merge", "N".to_string()));
    params.push(("zip", "false".to_string()));
    params
}

/// Escape the five XML special characters.
fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
