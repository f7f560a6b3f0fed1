use crate::custom::Scope;
use crate::error::{Error, Result};
use crate::resolver::Argument;
use serde_json::Value;

pub const KEY_USER_ID: &str = "userId";
pub const KEY_ROLE: &str = "role";
pub const ROLE_OWNER: &str = "OWNER";

/// Reject an OWNER-role request whose `userId` is not the visitor's.
/// Without a visitor the check fails closed.
pub fn verify_access(scope: &mut Scope<'_>, _args: &[Argument]) -> Result<Value> {
    let user_id = scope.document.get_i64(KEY_USER_ID);
    let role = scope.document.get_string(KEY_ROLE);
    if role.as_deref() == Some(ROLE_OWNER) {
        let visitor_id = scope.visitor.and_then(|v| v.visitor_id());
        if visitor_id != Some(user_id) {
            return Err(Error::AccessDenied(format!(
                "logged-in user does not match role {} for userId {}",
                ROLE_OWNER, user_id
            )));
        }
    }
    Ok(Value::Null)
}
