use super::{Collection, Workspace, members_path};
use crate::client::RequestOptions;
use crate::error::Result;
use crate::types::{AddMemberRequest, Member, MemberResponse, Role, UpdateRoleRequest};
use tracing::{debug, info};

impl Workspace {
    /// Add a member, showing a placeholder row until the server answers.
    ///
    /// On success the canonical record takes the first position, unless the
    /// active organization changed while the request was in flight. On
    /// failure the placeholder is removed and the error is returned.
    pub async fn add_member(&self, email: &str, role: Role) -> Result<Member> {
        let org_id = self.require_org()?;
        let email = email.trim();

        let placeholder = Member::placeholder(email, role);
        let placeholder_id = placeholder.id.clone();
        let epoch = self.state().epoch()?;
        self.state().update(|c| c.members.insert(0, placeholder))?;
        self.render();

        let body = AddMemberRequest {
            email: email.to_string(),
            role,
        };
        let result = self.send_add_member(&org_id, &body).await;

        self.state()
            .update(|c| c.members.retain(|m| m.id != placeholder_id))?;
        if let Ok(member) = &result {
            let applied = self.state().update_if_current(epoch, |c| {
                c.members.retain(|m| m.id != member.id);
                c.members.insert(0, member.clone());
            })?;
            if applied.is_none() {
                debug!("{} was added to {} after it stopped being active", member.email, org_id);
            }
        }
        self.render();

        match &result {
            Ok(member) => info!("Added {} as {}", member.email, member.role),
            Err(e) => debug!("Adding {} failed: {}", email, e),
        }
        result
    }

    async fn send_add_member(&self, org_id: &str, body: &AddMemberRequest) -> Result<Member> {
        let response: MemberResponse = self
            .gateway
            .request(&format!("{}add", members_path(org_id)), RequestOptions::post(body)?)
            .await?
            .parse("Unable to add member.")?;
        Ok(response.member)
    }

    /// Change a member's role in place. On failure the list is reloaded.
    pub async fn update_member_role(&self, member_id: &str, role: Role) -> Result<bool> {
        let org_id = self.require_org()?;
        let path = format!("{}{}/role", members_path(&org_id), member_id);

        let result = self.send_role(&path, role).await;
        let member = match result {
            Ok(member) => member,
            Err(e) => {
                let reported = self.report(e);
                self.refresh_collection(Collection::Members).await;
                return reported;
            }
        };

        self.state().update(|c| {
            if let Some(slot) = c.members.iter_mut().find(|m| m.id == member_id) {
                *slot = member;
            }
        })?;
        self.render();
        self.notify("Role updated.");
        Ok(true)
    }

    async fn send_role(&self, path: &str, role: Role) -> Result<Member> {
        let response: MemberResponse = self
            .gateway
            .request(path, RequestOptions::patch(&UpdateRoleRequest { role })?)
            .await?
            .parse("Unable to update role.")?;
        Ok(response.member)
    }

    /// Remove a member from the active organization.
    pub async fn remove_member(&self, member_id: &str) -> Result<bool> {
        let org_id = self.require_org()?;
        let path = format!("{}{}", members_path(&org_id), member_id);
        if let Err(e) = self.send_delete(&path, "Unable to remove member.").await {
            return self.report(e);
        }

        if let Some(member) = self.find_member(member_id)? {
            info!("Removed {}", member.email);
        }
        self.state()
            .update(|c| c.members.retain(|m| m.id != member_id))?;
        self.render();
        self.notify("Member removed.");
        Ok(true)
    }
}
